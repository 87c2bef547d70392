//! Filter options for list screens and the predicate tree they compile to.
//!
//! Options sharing a group key are OR-combined, distinct groups are
//! AND-combined in order of first appearance. [`Predicate::render`] turns the
//! tree into a SQL condition.

use std::fmt;

use kotatsu_lib::models::MangaTag;
use thiserror::Error;

use super::entities::tag::TagEntity;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unsupported filter option {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMacro {
    Nsfw,
    Completed,
    NewChapters,
    Favorite,
}

impl FilterMacro {
    fn name(&self) -> &'static str {
        match self {
            FilterMacro::Nsfw => "NSFW",
            FilterMacro::Completed => "COMPLETED",
            FilterMacro::NewChapters => "NEW_CHAPTERS",
            FilterMacro::Favorite => "FAVORITE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListFilterOption {
    Macro(FilterMacro),
    Tag(MangaTag),
}

impl ListFilterOption {
    pub fn group_key(&self) -> &'static str {
        match self {
            ListFilterOption::Macro(m) => m.name(),
            ListFilterOption::Tag(_) => "_tag",
        }
    }
}

impl fmt::Display for ListFilterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListFilterOption::Macro(m) => write!(f, "Macro({})", m.name()),
            ListFilterOption::Tag(tag) => write!(f, "Tag({})", tag.key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Condition(String),
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn render(&self) -> String {
        self.render_nested(false)
    }

    fn render_nested(&self, nested: bool) -> String {
        match self {
            Predicate::Condition(condition) => condition.clone(),
            Predicate::Or(items) | Predicate::And(items) if items.len() == 1 => {
                items[0].render_nested(nested)
            }
            Predicate::Or(items) => format!("({})", Self::join(items, " OR ")),
            Predicate::And(items) if nested => format!("({})", Self::join(items, " AND ")),
            Predicate::And(items) => Self::join(items, " AND "),
        }
    }

    fn join(items: &[Predicate], separator: &str) -> String {
        items
            .iter()
            .map(|item| item.render_nested(true))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Groups `options` by [`ListFilterOption::group_key`], keeping first appearance order
pub fn group_options(options: &[ListFilterOption]) -> Vec<(&'static str, Vec<&ListFilterOption>)> {
    let mut groups: Vec<(&'static str, Vec<&ListFilterOption>)> = vec![];
    for option in options {
        let key = option.group_key();
        match groups.iter_mut().find(|(group_key, _)| *group_key == key) {
            Some((_, group)) => group.push(option),
            None => groups.push((key, vec![option])),
        }
    }

    groups
}

/// Builds the predicate tree, mapping each option through `condition`
pub fn build_predicate<F>(
    options: &[ListFilterOption],
    condition: F,
) -> Result<Option<Predicate>, FilterError>
where
    F: Fn(&ListFilterOption) -> Result<String, FilterError>,
{
    let groups = group_options(options)
        .into_iter()
        .map(|(_, group)| {
            group
                .into_iter()
                .map(|option| condition(option).map(Predicate::Condition))
                .collect::<Result<Vec<_>, _>>()
                .map(Predicate::Or)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if groups.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Predicate::And(groups)))
    }
}

/// SQL condition of an option against the `suggestions` table
pub fn suggestion_condition(option: &ListFilterOption) -> Result<String, FilterError> {
    match option {
        ListFilterOption::Macro(FilterMacro::Nsfw) => Ok(
            "(SELECT nsfw FROM manga WHERE manga.manga_id = suggestions.manga_id) = 1".to_string(),
        ),
        ListFilterOption::Tag(tag) => Ok(format!(
            "EXISTS(SELECT * FROM manga_tags WHERE manga_tags.manga_id = suggestions.manga_id AND tag_id = {})",
            TagEntity::id_for(tag)
        )),
        other => Err(FilterError::Unsupported(other.to_string())),
    }
}

/// Full select for the filtered suggestion list. `limit == 0` means no limit.
pub fn build_suggestion_query(
    limit: usize,
    options: &[ListFilterOption],
) -> Result<String, FilterError> {
    let mut query = String::from("SELECT * FROM suggestions");
    if let Some(predicate) = build_predicate(options, suggestion_condition)? {
        query.push_str(" WHERE ");
        query.push_str(&predicate.render());
    }
    query.push_str(" ORDER BY relevance DESC");
    if limit > 0 {
        query.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(query)
}
