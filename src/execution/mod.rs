mod query_evaluator;

pub use query_evaluator::QueryEvaluator;
