// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// Book in the catalogue.
#[derive(Debug, Clone, Entity)]
pub struct Book {
    #[id]
    pub id: i64,

    #[version]
    pub version: i32,

    /// Title as printed on the cover.
    pub title: String,

    pub subtitle: Option<String>,

    pub author: Author,

    pub co_authors: Vec<Author>,

    pub translator: Option<Author>,

    #[field(readonly)]
    pub isbn: String,

    pub published: Option<DateTime<Utc>>
}

#[entity(table = "authors")]
pub struct Author {
    #[generated_value]
    pub id: i64,

    pub name: String,

    pub books: HashSet<Book>,

    pub mentor: Option<Box<Author>>
}

pub enum Genre {
    Fiction,
    Poetry
}
