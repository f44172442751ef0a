//! Unillm - one completion interface over several LLM vendors
//!
//! Callers build a single [`GenerationRequest`] and hand it to any
//! [`Provider`]. The provider normalizes it into its vendor's wire shape,
//! runs it in one of four modes (blocking or async, single-shot or streaming)
//! and returns a [`Completion`] whose text, payload and metadata look the same
//! whichever vendor served it.
//!
//! # Quick Start
//!
//! ```no_run
//! # use unillm::prelude::*;
//! # #[cfg(feature = "providers")]
//! # use unillm::providers::Mistral;
//! #
//! # fn main() -> Result<(), unillm::Error> {
//! #     #[cfg(feature = "providers")]
//! #     {
//!     let provider = Mistral::with_api_key("your-api-key")?;
//!
//!     let request = GenerationRequest::builder("Hello, world!")
//!         .message(Message::user("Be brief from now on."))
//!         .message(Message::assistant("Understood."))
//!         .max_tokens(50)
//!         .build();
//!
//!     let completion = provider.complete(&request)?;
//!     println!("{completion} in {:.2}s", completion.meta().latency_secs());
//! #     }
//! #     Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core types
pub use unillm_core::*;

#[cfg(feature = "providers")]
#[cfg_attr(docsrs, doc(cfg(feature = "providers")))]
pub mod providers {
    //! Provider implementations
    pub use unillm_providers::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use unillm_core::{
        Completion, CompletionMeta, Error, ExtraPolicy, GenerationRequest, Message, Provider,
        Role, Usage,
    };

    #[cfg(feature = "providers")]
    pub use unillm_providers::{Anthropic, Mistral, ProviderBuilder};
}
