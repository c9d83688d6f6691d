/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Test harness for Acton Machine.
//!
//! Annotate async tests with `#[machine_test]` to run them on a dedicated
//! current-thread runtime with panic capture and a per-test tracing span.
//!
//! ```rust,ignore
//! use acton_machine_test::prelude::*;
//!
//! #[machine_test(start_paused)]
//! async fn ask_times_out() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

/// Re-exports the test attribute.
pub mod prelude {
    pub use acton_machine_test_macro::machine_test;
}

#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}
