mod ledger;
mod normalize;

pub use ledger::AddressLedger;
pub use normalize::{normalize, street_segment};
