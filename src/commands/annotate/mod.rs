mod pipeline;
mod run;
#[cfg(test)]
mod tests;

pub use pipeline::CheckerPipeline;
pub(crate) use run::default_output_path;
pub use run::run;
