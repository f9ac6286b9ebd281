mod model;
mod repository;


pub use model::{ExpirationDB, OptionContractDB, StockPriceDB};
pub use repository::ChainRepository;
