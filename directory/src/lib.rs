//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! # Warden Player Directory
//!
//! The lookup and persistence surface the console control channel calls into:
//!
//! - resolving display aliases to canonical player names
//! - recording session logins and logouts
//! - expanding a named item bundle into `(item, quantity, quality)` entries
//!
//! [`PlayerDirectory`] is the seam; [`MemoryDirectory`] is an in-process implementation
//! that also carries the management operations (alias and bundle editing, playtime
//! statistics). Every hook on the trait has a pass-through default, so
//! [`NullDirectory`] is a directory that knows nothing and records nothing.
//!
//! ```
//! use warden_directory::{MemoryDirectory, PlayerDirectory};
//!
//! # async fn example() -> warden_directory::Result<()> {
//! let directory = MemoryDirectory::new();
//! directory.add_alias("Revlin McAwesome", "Revlin")?;
//! assert_eq!(directory.resolve_alias("Revlin").await, "Revlin McAwesome");
//! assert_eq!(directory.resolve_alias("Stranger").await, "Stranger");
//! # Ok(())
//! # }
//! ```

mod directory;
mod error;
mod memory;

pub use directory::{Bundle, BundleItem, NullDirectory, PlayerDirectory};
pub use error::{DirectoryError, Result};
pub use memory::{AliasEntry, BundleSummary, MemoryDirectory, PlayerStats, SessionRecord};
