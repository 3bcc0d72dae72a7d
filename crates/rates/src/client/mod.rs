//! HTTP price provider gateways.

pub mod cryptocompare;

pub use cryptocompare::CryptoCompareProvider;
