mod readme;
mod samples;

pub use readme::{read_named_file, read_primary_document};
pub use samples::{collect_code_samples, SampleLimits};
