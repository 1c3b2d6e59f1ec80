mod bounds;
pub use self::bounds::*;

mod minmax;
pub use self::minmax::*;

mod projection;
pub use self::projection::*;

mod statistics;
pub use self::statistics::*;
