//! LLM provider implementations for Deskhand.
//!
//! One implementation covers the vast majority of hosted LLMs: the
//! OpenAI-compatible `/chat/completions` contract, as exposed by OpenRouter,
//! OpenAI, Together, Fireworks, and local servers like Ollama/vLLM.

pub mod openrouter;

pub use openrouter::OpenRouterProvider;
