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

//! Directory error types

use thiserror::Error;

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Directory error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The alias already names a different player
    #[error("Alias '{alias}' is already used for '{full_name}'")]
    AliasTaken {
        /// The requested alias
        alias: String,
        /// The player currently holding it
        full_name: String,
    },

    /// No such alias
    #[error("Alias '{0}' not found")]
    AliasNotFound(String),

    /// A bundle with this name already exists
    #[error("Bundle '{0}' already exists")]
    BundleExists(String),

    /// No bundle with this name
    #[error("Bundle '{0}' not found")]
    BundleNotFound(String),

    /// The bundle does not contain the item
    #[error("Item '{item}' not found in bundle '{bundle}'")]
    ItemNotFound {
        /// Bundle name
        bundle: String,
        /// Item name
        item: String,
    },

    /// The backing store could not be reached
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    /// Check if the error means the store itself failed, as opposed to a missing record
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryError::Unavailable(_))
    }
}
