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

use std::{
    fs::{copy, create_dir_all, read_dir},
    path::PathBuf,
};

/// Copy the test configuration next to the build artifacts. The unit tests read their
/// configuration from `$OUT_DIR/.config` instead of the environment variable.
fn main() {
    println!("cargo:rerun-if-changed=src/test/config");

    let src = PathBuf::from("src/test/config");
    let dst = PathBuf::from(std::env::var("OUT_DIR").unwrap()).join(".config");

    create_dir_all(&dst).unwrap();
    for entry in read_dir(src).unwrap() {
        let entry = entry.unwrap();
        copy(entry.path(), dst.join(entry.file_name())).unwrap();
    }
}
