use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryDraft, CategoryId, CategoryUpdate, CurrencyCode, Description, Group, GroupId,
    Money, Month, Name, UserId,
};
use crate::errors::TrackingError;
use crate::storage::{ExpenseRepository, GroupRepository};

use super::{parse_optional_month, ServiceResult};

/// Raw category form values; months as `YYYY-MM`, budget in cents.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub is_recurrent: bool,
    pub start_month: String,
    pub end_month: Option<String>,
    pub budget_cents: i64,
}

impl CategoryInput {
    pub fn into_draft(self, currency: &CurrencyCode) -> ServiceResult<CategoryDraft> {
        Ok(CategoryDraft {
            name: Name::new(self.name.trim())?,
            description: Description::new(self.description.trim())?,
            is_recurrent: self.is_recurrent,
            start_month: parse_optional_month(Some(self.start_month.as_str()))?,
            end_month: parse_optional_month(self.end_month.as_deref())?,
            budget: Money::new(self.budget_cents, currency),
        })
    }
}

pub struct CategoryService {
    groups: Arc<dyn GroupRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    currency: CurrencyCode,
}

impl CategoryService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            groups,
            expenses,
            currency,
        }
    }

    pub fn create(
        &self,
        user_id: UserId,
        group_id: GroupId,
        input: CategoryInput,
    ) -> ServiceResult<Category> {
        let mut group = self.groups.find_group(group_id)?;
        if group.user_id() != user_id {
            return Err(TrackingError::GroupNotFound(group_id).into());
        }
        let draft = input.into_draft(&self.currency)?;
        let category = group.create_category(Uuid::new_v4(), draft)?;
        self.groups.save_group(&group)?;
        debug!("category `{}` created in group {}", category.name(), group_id);
        Ok(category)
    }

    /// Applies an edit made while viewing `view_month`, persisting a fork as one save.
    ///
    /// When the edit forks, expenses of the old category dated in or after
    /// `view_month` follow the new category.
    pub fn update(
        &self,
        user_id: UserId,
        id: CategoryId,
        input: CategoryInput,
        view_month: Option<&str>,
    ) -> ServiceResult<CategoryUpdate> {
        let mut group = self.owning_group(user_id, id)?;
        let view_month = parse_optional_month(view_month)?;
        let draft = input.into_draft(&self.currency)?;
        let update = group.update_category(id, draft, view_month)?;
        self.groups.save_group(&group)?;

        if let (Some(original), Some(view)) = (update.forked_from, view_month) {
            let moved =
                self.expenses
                    .reassign_category_from_month(original, update.category.id(), view)?;
            info!(
                "category {} forked into {} from {}; {} expenses moved",
                original,
                update.category.id(),
                view,
                moved
            );
        }
        Ok(update)
    }

    pub fn delete(&self, user_id: UserId, id: CategoryId) -> ServiceResult<()> {
        self.owning_group(user_id, id)?;
        self.groups.delete_category(id)?;
        info!("category {} deleted", id);
        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: CategoryId) -> ServiceResult<Category> {
        let group = self.owning_group(user_id, id)?;
        group
            .category(id)
            .cloned()
            .ok_or_else(|| TrackingError::CategoryNotFound(id).into())
    }

    /// Categories of a group by name, then start month; optionally only those active for `month`.
    pub fn list(
        &self,
        user_id: UserId,
        group_id: GroupId,
        month: Option<Month>,
    ) -> ServiceResult<Vec<Category>> {
        let group = self.groups.find_group(group_id)?;
        if group.user_id() != user_id {
            return Err(TrackingError::GroupNotFound(group_id).into());
        }
        let mut categories: Vec<Category> = match month {
            Some(month) => group.categories_for_month(month).into_iter().cloned().collect(),
            None => group.categories().to_vec(),
        };
        categories.sort_by(|a, b| {
            a.name()
                .as_str()
                .cmp(b.name().as_str())
                .then_with(|| a.start_month().cmp(&b.start_month()))
        });
        Ok(categories)
    }

    fn owning_group(&self, user_id: UserId, id: CategoryId) -> ServiceResult<Group> {
        let group = self.groups.find_group_by_category(id)?;
        if group.user_id() != user_id {
            return Err(TrackingError::CategoryNotFound(id).into());
        }
        Ok(group)
    }
}
