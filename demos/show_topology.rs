// NuageLab: Nuage VSP testbed management written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Parse the configured topology file and print the retained records, together with how each
//! one classifies.

use nuage_lab::{classify, config::CONFIG, parse_topology_file, NuageLabError};

fn main() -> Result<(), NuageLabError> {
    pretty_env_logger::init();

    let records = parse_topology_file(&CONFIG.nuage.topology_file, &CONFIG.nuage.components)?;

    for r in &records {
        let host_type = r.host_type.map(|t| t.to_string()).unwrap_or_default();
        let component = r.component.as_deref().unwrap_or("-");
        let kind = r
            .component
            .as_deref()
            .and_then(classify)
            .map(|k| format!("{k:?}"))
            .unwrap_or_else(|| "unclassified".to_string());
        println!(
            "{:<6} {:<16} {:<20} {:<12} {kind}",
            host_type, r.name, r.address, component
        );
    }

    Ok(())
}
