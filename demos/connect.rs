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

//! Build the testbed from the configuration, open all sessions, and print what is reachable.

use nuage_lab::{Dut, NuageLabError, Testbed};

#[tokio::main]
async fn main() -> Result<(), NuageLabError> {
    pretty_env_logger::init();

    // build the testbed. This parses the topology file, but opens no connection yet.
    let testbed = Testbed::new()?;

    // establish all sessions, sequentially and fail-fast
    testbed.open_sessions().await?;

    println!("execution server: {}", testbed.exec_server().ssh().name());
    for (key, dut) in testbed.duts() {
        println!("{key}: {}", dut.name());
    }

    // the sessions stay usable until the control masters expire
    if let Some(vsd) = testbed.dut_by_role("vsd_1").and_then(|d| d.as_sdn_manager()) {
        if let Some(user) = vsd.user().await {
            println!("VSD session user: {} ({})", user.user_name, user.id);
        }
    }

    Ok(())
}
