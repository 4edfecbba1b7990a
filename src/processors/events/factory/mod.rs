pub mod processor;

pub use processor::FactoryProcessor;
