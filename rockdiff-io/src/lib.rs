//! Reading and writing of change point clouds as delimited text.
//!
//! The [ascii] module reads the tabular output of a distance computation (M3C2 or cloud-to-cloud) into a
//! [PointCloud](rockdiff_core::containers::PointCloud), tolerating files with and without a header row, and writes
//! the artifacts of a change detection run: the clustered cloud, the cluster summary table and one file per
//! cluster.
//!
//! Failures to open or create a file are reported as [ChangeError::Io](rockdiff_core::ChangeError::Io) inside the
//! returned `anyhow::Error`, so callers can always recover the offending path with `downcast_ref`.

pub mod ascii;
