//! The group aggregate: owns its categories and guards their temporal invariants.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{Result, TrackingError};

use super::{
    category::{validate_budget, Category, CategoryDraft, Recurrence},
    common::{CategoryId, GroupId, Identifiable, UserId},
    interval::MonthInterval,
    month::Month,
    values::{Description, DisplayOrder, Name},
};

/// Result of [`Group::update_category`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    /// The category carrying the submitted values from now on.
    pub category: Category,
    /// Id of the closed historical category when the edit forked.
    pub forked_from: Option<CategoryId>,
}

impl CategoryUpdate {
    pub fn is_fork(&self) -> bool {
        self.forked_from.is_some()
    }
}

/// A named collection of categories belonging to one user.
///
/// Every mutation either applies completely or leaves the group untouched.
/// No two categories may share a name while their month windows intersect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGroup")]
pub struct Group {
    id: GroupId,
    user_id: UserId,
    name: Name,
    #[serde(default)]
    description: Description,
    #[serde(default)]
    order: DisplayOrder,
    #[serde(default)]
    categories: Vec<Category>,
}

/// Stored form of a group; categories are re-admitted one by one on load.
#[derive(Deserialize)]
struct RawGroup {
    id: GroupId,
    user_id: UserId,
    name: Name,
    #[serde(default)]
    description: Description,
    #[serde(default)]
    order: DisplayOrder,
    #[serde(default)]
    categories: Vec<Category>,
}

impl TryFrom<RawGroup> for Group {
    type Error = TrackingError;

    fn try_from(raw: RawGroup) -> Result<Self> {
        let mut group = Group::new(raw.id, raw.user_id, raw.name, raw.description, raw.order);
        for category in raw.categories {
            group.add_category(category)?;
        }
        Ok(group)
    }
}

impl Group {
    pub fn new(
        id: GroupId,
        user_id: UserId,
        name: Name,
        description: Description,
        order: DisplayOrder,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            description,
            order,
            categories: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn order(&self) -> DisplayOrder {
        self.order
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id() == id)
    }

    pub fn update_details(&mut self, name: Name, description: Description, order: DisplayOrder) {
        self.name = name;
        self.description = description;
        self.order = order;
    }

    /// Adopts a category built elsewhere for this group.
    pub fn add_category(&mut self, category: Category) -> Result<()> {
        if category.group_id() != self.id {
            return Err(TrackingError::CategoryGroupMismatch {
                category: category.id(),
                group: self.id,
            });
        }
        if self.category(category.id()).is_some() {
            return Err(TrackingError::DuplicateCategory(category.id()));
        }
        self.ensure_unique(category.name(), &category.window(), category.id())?;
        self.categories.push(category);
        Ok(())
    }

    pub fn create_category(&mut self, id: CategoryId, draft: CategoryDraft) -> Result<Category> {
        let category = Category::new(id, self.id, draft)?;
        self.add_category(category.clone())?;
        debug!(
            "group {} gained category `{}` ({})",
            self.id,
            category.name(),
            category.id()
        );
        Ok(category)
    }

    /// Applies an edit submitted while looking at `view_month`.
    ///
    /// A recurring category edited from a month after its start (with the
    /// start month left unchanged) is forked: the existing category is closed
    /// at the month before `view_month` and a new category with a fresh id
    /// takes the submitted values from `view_month` onward, inheriting the
    /// original end month. Every other edit rewrites the category in place.
    pub fn update_category(
        &mut self,
        id: CategoryId,
        draft: CategoryDraft,
        view_month: Option<Month>,
    ) -> Result<CategoryUpdate> {
        let index = self.position(id)?;
        let recurrence = draft.recurrence()?;
        validate_budget(&draft.budget)?;

        match view_month.filter(|view| forks_at(&self.categories[index], &draft, *view)) {
            Some(view) => self.fork_category(index, draft, view),
            None => {
                self.ensure_unique(&draft.name, &recurrence.window(), id)?;
                let category = &mut self.categories[index];
                category.apply(draft, recurrence);
                debug!("category {} updated in place", id);
                Ok(CategoryUpdate {
                    category: category.clone(),
                    forked_from: None,
                })
            }
        }
    }

    pub fn remove_category(&mut self, id: CategoryId) -> Result<Category> {
        let index = self.position(id)?;
        let removed = self.categories.remove(index);
        debug!("category {} removed from group {}", id, self.id);
        Ok(removed)
    }

    /// Categories active for `month`, in collection order.
    pub fn categories_for_month(&self, month: Month) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|category| category.active_for(month))
            .collect()
    }

    /// A copy of this group holding only the categories active for `month`.
    pub fn for_month(&self, month: Month) -> Group {
        let mut scoped = self.clone();
        scoped.categories.retain(|category| category.active_for(month));
        scoped
    }

    pub(crate) fn sort_categories_by_name(&mut self) {
        self.categories
            .sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
    }

    fn fork_category(
        &mut self,
        index: usize,
        draft: CategoryDraft,
        view: Month,
    ) -> Result<CategoryUpdate> {
        let original = &self.categories[index];
        let original_id = original.id();
        let carried_end = if draft.is_recurrent {
            original.end_month()
        } else {
            None
        };
        let forward_draft = CategoryDraft {
            start_month: Some(view),
            end_month: carried_end,
            ..draft
        };
        let forward = Category::new(Uuid::new_v4(), self.id, forward_draft)?;

        let mut staged = self.clone();
        staged.categories[index].close_at(view.previous())?;
        staged.add_category(forward.clone())?;
        *self = staged;

        info!(
            "category {} forked at {}: history closed at {}, continues as {}",
            original_id,
            view,
            view.previous(),
            forward.id()
        );
        Ok(CategoryUpdate {
            category: forward,
            forked_from: Some(original_id),
        })
    }

    fn position(&self, id: CategoryId) -> Result<usize> {
        self.categories
            .iter()
            .position(|category| category.id() == id)
            .ok_or(TrackingError::CategoryNotFound(id))
    }

    fn ensure_unique(&self, name: &Name, window: &MonthInterval, exclude: CategoryId) -> Result<()> {
        let clash = self
            .categories
            .iter()
            .any(|existing| existing.id() != exclude && existing.conflicts_with(name, window));
        if clash {
            return Err(TrackingError::CategoryNameExists {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn forks_at(category: &Category, draft: &CategoryDraft, view: Month) -> bool {
    matches!(category.recurrence(), Recurrence::Recurring { .. })
        && view.after(&category.start_month())
        && category.active_for(view)
        && draft.start_month == Some(category.start_month())
}

impl Identifiable for Group {
    fn id(&self) -> GroupId {
        self.id
    }
}
