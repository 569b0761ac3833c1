// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Core modules
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// In-memory doubles shared by unit and integration tests
#[cfg(any(test, feature = "testing"))]
#[doc(hidden)]
pub mod testing;

// Re-export commonly used types
pub use cli::action::{execute, CommandContext, Factory, Lifecycle};
pub use domain::config::KbcliConfig;
pub use infrastructure::kubernetes::{Gvr, KbClient, KbClientImpl, ListSelector};
pub use shared::{ErrorStrategy, KbError, Result};
