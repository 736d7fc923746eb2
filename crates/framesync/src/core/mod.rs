pub mod clock;
pub mod diag;
pub mod rhythm;
pub mod spike_filter;
pub mod stepper;
pub mod sync;
pub mod variance;
