// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod coverage;
mod inspect;
mod split;

pub use coverage::CoverageCmd;
pub use inspect::InspectCmd;
pub use split::SplitCmd;
