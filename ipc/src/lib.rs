//! # Inter-Process Communication (IPC)
//!
//! This crate defines Burrow's fixed-capacity message-passing primitives.
//!
//! ## Philosophy
//!
//! - **Bounded, never blocking**: Every queue has a compile-time capacity and
//!   rejects work when full instead of waiting
//! - **No allocation on the hot path**: Messages are copied into fixed slots
//! - **Same code everywhere**: The channels behave identically when driven by
//!   OS threads or by synchronous calls from a hosting runtime
//!
//! ## Primitives
//!
//! - [`RingChannel`]: single-producer/single-consumer byte-message ring with an
//!   optional send-completion hook, used for keyboard input, command lines and
//!   terminal output
//! - [`ConcurrentSlotQueue`]: multi-producer/single-consumer queue that claims a
//!   slot with compare-and-swap before writing
//! - [`MessageSlot`]: a fixed-size byte buffer with an explicit length

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod ring;
pub mod slot;
pub mod slot_queue;

pub use ring::{RingChannel, SendHook, CHANNEL_CAPACITY};
pub use slot::{MessageSlot, MESSAGE_CAPACITY};
pub use slot_queue::ConcurrentSlotQueue;
