mod polygon;
pub use self::polygon::*;

mod boundary;
pub use self::boundary::*;
