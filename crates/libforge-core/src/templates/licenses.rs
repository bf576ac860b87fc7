//! License catalogue: source banners and `LICENSE` file bodies

use super::{substitute, TemplateConfig};

/// A license known to the scaffolder
#[derive(Debug, Clone, Copy)]
pub struct License {
    /// SPDX identifier
    pub id: &'static str,
    /// Notice placed at the top of source files and bundles
    header: &'static str,
    /// Body of the `LICENSE` file, if the license has one
    text: Option<&'static str>,
}

const APACHE_2_0_HEADER: &str = include_str!("licenses/apache-2.0-header.txt");
const APACHE_2_0: &str = include_str!("licenses/apache-2.0-license.txt");
const MIT: &str = include_str!("licenses/mit.txt");
const ISC: &str = include_str!("licenses/isc.txt");

const LICENSES: &[License] = &[
    License {
        id: "Apache-2.0",
        header: APACHE_2_0_HEADER,
        text: Some(APACHE_2_0),
    },
    License {
        id: "MIT",
        header: "Copyright (c) {{year}} {{author_name}}\n\n\
                 Use of this source code is governed by the MIT license\n\
                 found in the LICENSE file.\n",
        text: Some(MIT),
    },
    License {
        id: "ISC",
        header: "Copyright (c) {{year}} {{author_name}}\n\n\
                 Use of this source code is governed by the ISC license\n\
                 found in the LICENSE file.\n",
        text: Some(ISC),
    },
    License {
        id: "UNLICENSED",
        header: "Copyright (c) {{year}} {{author_name}}. All rights reserved.\n",
        text: None,
    },
];

/// Look up a license by SPDX id (case-insensitive)
pub fn find(id: &str) -> Option<&'static License> {
    LICENSES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

/// Identifiers of every known license
pub fn known_ids() -> Vec<&'static str> {
    LICENSES.iter().map(|l| l.id).collect()
}

impl License {
    /// `LICENSE` file contents for `cfg`, if this license ships one
    pub fn render_text(&self, cfg: &TemplateConfig) -> Option<String> {
        self.text.map(|text| substitute(text, cfg))
    }

    /// Header notice for `cfg`, wrapped in a JS block comment
    pub fn render_banner(&self, cfg: &TemplateConfig) -> String {
        comment_block(&substitute(self.header, cfg))
    }
}

/// Banner placed at the top of emitted bundles.
///
/// Falls back to a plain attribution when the license is not in the catalogue.
pub fn compile_banner(cfg: &TemplateConfig) -> String {
    match find(&cfg.license) {
        Some(license) => {
            let notice = substitute(license.header, cfg);
            comment_block(&format!("{}\n\n{}", cfg.lib_name, notice))
        }
        None => {
            let mut notice = format!("{}\n\nCopyright {}", cfg.lib_name, cfg.author.name);
            if !cfg.license.is_empty() {
                notice.push_str(&format!("\nLicensed under {}", cfg.license));
            }
            comment_block(&notice)
        }
    }
}

fn comment_block(text: &str) -> String {
    let mut out = String::from("/**\n");
    for line in text.trim_end().lines() {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */");
    out
}
