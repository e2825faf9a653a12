pub mod bonus;
pub mod catalog;
pub mod commission;
pub mod engine;
pub mod member;
pub mod processor;
pub mod purchase;
pub mod settings;
#[cfg(test)]
pub mod test_utils;
pub mod tree;
pub mod wallet;

pub use bonus::Bonus;
pub use catalog::Catalog;
pub use engine::Engine;
pub use member::Member;
pub use processor::Processor;
pub use purchase::Purchase;
pub use settings::Settings;
pub use tree::Tree;
pub use wallet::Wallet;
