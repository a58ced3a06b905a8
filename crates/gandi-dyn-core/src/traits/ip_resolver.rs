// # IP Resolver Trait
//
// Defines the interface for discovering the caller's public IPv4 address.
//
// ## Implementations
//
// - HTTP lookup service: `gandi-dyn-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use gandi_dyn_core::IpResolver;
//
// async fn show(resolver: &dyn IpResolver) -> gandi_dyn_core::Result<()> {
//     let ip = resolver.current().await?;
//     println!("public address: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP resolver implementations
///
/// A resolver answers one question, once per call: what is the public IPv4
/// address right now. It must not cache answers between calls and must not
/// retry: a failed lookup is returned to the caller as is.
///
/// The returned address is already validated; implementations reject
/// anything that is not a dotted-quad IPv4 address with
/// [`Error::Validation`](crate::Error::Validation).
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Fetch the current public IPv4 address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Where the address comes from (for logging/debugging)
    fn describe(&self) -> String;
}
