pub mod channel_provider;
pub mod static_tokens;

pub use channel_provider::ChannelIdentityProvider;
pub use static_tokens::StaticTokenVerifier;
