mod build;
mod run;
mod serve;

pub use build::{BuildArgs, cmd_build};
pub use run::{RunArgs, cmd_run};
pub use serve::{ServeArgs, cmd_serve};
