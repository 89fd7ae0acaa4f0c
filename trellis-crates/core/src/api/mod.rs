mod options;
mod outputs;
mod preprocessor;
pub(crate) mod solver;

pub use options::SolverOptions;
pub use outputs::Improvement;
pub use outputs::IteratedSolution;
pub use outputs::SolveResult;
pub use preprocessor::Preprocessor;
