//! # Tutorial: Binding a Cloud API with cirrus
//!
//! Learn to describe an API declaratively and call it step by step.
//!
//! ## Chapters
//!
//! 1. [Getting Started][chapter_0] - Your first method spec and client
//! 2. [Parameters & Binders][chapter_1] - Path, query, headers, payloads
//! 3. [Responses & Errors][chapter_2] - Parsers, error kinds, fallbacks
//! 4. [Filters, Retries & Caches][chapter_3] - Signing, tokens, backoff
//!
//! Ready? Start with [Chapter 0: Getting Started][chapter_0].

pub mod chapter_0;
pub mod chapter_1;
pub mod chapter_2;
pub mod chapter_3;
