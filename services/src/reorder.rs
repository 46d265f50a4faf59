//! Dense 1-based ordering of sibling lists.
//!
//! Three sibling scopes are managed here: modules in a course, lessons in a
//! module, and questions in a quiz lesson. Writers are serialized per parent
//! through the parent's `version` column: every write moves it from `v` to
//! `v + 1` with a conditional update, and the loser of a race sees zero rows
//! affected and gets a conflict carrying the stored order.

use std::collections::HashSet;

use db::models::{course, lesson, module};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{info, warn};

use crate::access::{self, Viewer};
use crate::error::{is_lock_contention, EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReorderScope {
    /// Modules of a course.
    Modules,
    /// Lessons of a module.
    Lessons,
    /// Questions of a quiz lesson.
    Questions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedItem {
    pub id: String,
    pub order: i32,
}

/// The stored order of one sibling list together with the parent version it
/// was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSnapshot {
    pub scope: ReorderScope,
    pub parent_id: String,
    pub version: i64,
    pub items: Vec<OrderedItem>,
}

impl OrderSnapshot {
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Item '{0}' appears more than once in the requested order")]
    Duplicate(String),

    #[error("Item '{0}' is not part of this list")]
    UnknownItem(String),

    #[error("The requested order does not match the current items ({missing} missing, {unknown} unknown)")]
    Stale { missing: usize, unknown: usize },
}

/// Turns a requested id sequence into `(id, order)` assignments.
///
/// `desired` must be a permutation of `current`. Duplicates are a caller
/// mistake; missing or unknown ids mean the caller's view is out of date.
pub fn plan_reorder(
    current: &[String],
    desired: &[String],
) -> Result<Vec<(String, i32)>, ReorderError> {
    let mut seen = HashSet::with_capacity(desired.len());
    for id in desired {
        if !seen.insert(id.as_str()) {
            return Err(ReorderError::Duplicate(id.clone()));
        }
    }

    let known: HashSet<&str> = current.iter().map(String::as_str).collect();
    let unknown = desired.iter().filter(|id| !known.contains(id.as_str())).count();
    let missing = current.iter().filter(|id| !seen.contains(id.as_str())).count();
    if unknown > 0 || missing > 0 {
        return Err(ReorderError::Stale { missing, unknown });
    }

    Ok(desired
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx as i32 + 1))
        .collect())
}

/// Swaps `id` with its neighbour.
///
/// `Ok(None)` means the move would leave the list (first item up, last item
/// down) and nothing should change.
pub fn swap_move(
    current: &[String],
    id: &str,
    direction: MoveDirection,
) -> Result<Option<Vec<String>>, ReorderError> {
    let idx = current
        .iter()
        .position(|c| c == id)
        .ok_or_else(|| ReorderError::UnknownItem(id.to_owned()))?;

    let target = match direction {
        MoveDirection::Up if idx > 0 => idx - 1,
        MoveDirection::Down if idx + 1 < current.len() => idx + 1,
        _ => return Ok(None),
    };

    let mut next = current.to_vec();
    next.swap(idx, target);
    Ok(Some(next))
}

pub struct ReorderCoordinator;

impl ReorderCoordinator {
    /// The stored order of a sibling list and the parent version.
    pub async fn current_order<C: ConnectionTrait>(
        db: &C,
        scope: ReorderScope,
        parent_id: &str,
    ) -> EngineResult<OrderSnapshot> {
        let (version, ids) = match scope {
            ReorderScope::Modules => {
                let course = course::Entity::find_by_id(parent_id.to_owned())
                    .one(db)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Course not found"))?;
                let ids = module::Model::for_course(db, parent_id)
                    .await?
                    .into_iter()
                    .map(|m| m.id)
                    .collect::<Vec<_>>();
                (course.version, ids)
            }
            ReorderScope::Lessons => {
                let module = module::Entity::find_by_id(parent_id.to_owned())
                    .one(db)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Module not found"))?;
                let ids = lesson::Model::for_module(db, parent_id)
                    .await?
                    .into_iter()
                    .map(|l| l.id)
                    .collect::<Vec<_>>();
                (module.version, ids)
            }
            ReorderScope::Questions => {
                let lesson = find_quiz_lesson(db, parent_id).await?;
                (lesson.version, lesson.quiz()?.question_ids())
            }
        };

        // Positions are reported densely even if storage drifted.
        let items = ids
            .into_iter()
            .enumerate()
            .map(|(idx, id)| OrderedItem {
                id,
                order: idx as i32 + 1,
            })
            .collect();

        Ok(OrderSnapshot {
            scope,
            parent_id: parent_id.to_owned(),
            version,
            items,
        })
    }

    /// The order a caller may see. Course staff get the stored order. Learners
    /// must be enrolled, only see published lessons, and may read a question
    /// order only for a lesson they can open.
    pub async fn order_for_viewer<C: ConnectionTrait>(
        db: &C,
        viewer: &Viewer,
        scope: ReorderScope,
        parent_id: &str,
    ) -> EngineResult<OrderSnapshot> {
        match scope {
            ReorderScope::Modules => {
                let course = access::find_course(db, parent_id).await?;
                if !viewer.is_staff_for(&course) {
                    access::require_enrollment(db, viewer, &course.id).await?;
                }
                Self::current_order(db, scope, parent_id).await
            }
            ReorderScope::Lessons => {
                let (module, course) = access::module_context(db, parent_id).await?;
                if viewer.is_staff_for(&course) {
                    return Self::current_order(db, scope, parent_id).await;
                }
                access::require_enrollment(db, viewer, &course.id).await?;
                let items = lesson::Model::for_module(db, parent_id)
                    .await?
                    .into_iter()
                    .filter(|l| l.is_published)
                    .zip(1..)
                    .map(|(l, order)| OrderedItem { id: l.id, order })
                    .collect();
                Ok(OrderSnapshot {
                    scope,
                    parent_id: parent_id.to_owned(),
                    version: module.version,
                    items,
                })
            }
            ReorderScope::Questions => {
                access::open_lesson(db, viewer, parent_id, false).await?;
                Self::current_order(db, scope, parent_id).await
            }
        }
    }

    /// Replaces the order of a sibling list with `desired`.
    ///
    /// With `expected_version`, the request only applies if nobody reordered
    /// the list since the caller read it. On any failure the transaction is
    /// rolled back and the error carries the stored order.
    pub async fn apply(
        db: &DatabaseConnection,
        scope: ReorderScope,
        parent_id: &str,
        desired: &[String],
        expected_version: Option<i64>,
    ) -> EngineResult<OrderSnapshot> {
        let outcome = match db.begin().await {
            Ok(txn) => match Self::write_order(&txn, scope, parent_id, desired, expected_version).await {
                // A commit can still be refused by a concurrent writer.
                Ok(snapshot) => txn.commit().await.map(|_| snapshot).map_err(EngineError::from),
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        warn!(scope = %scope, parent_id, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            },
            Err(err) => Err(err.into()),
        };

        match outcome {
            Ok(snapshot) => {
                info!(
                    scope = %scope,
                    parent_id,
                    version = snapshot.version,
                    items = snapshot.items.len(),
                    "Reorder applied"
                );
                Ok(snapshot)
            }
            Err(err) => Err(Self::reconcile(db, scope, parent_id, err).await),
        }
    }

    /// Moves one item up or down by swapping it with its neighbour, then
    /// renumbers through [`ReorderCoordinator::apply`].
    pub async fn move_item(
        db: &DatabaseConnection,
        scope: ReorderScope,
        parent_id: &str,
        item_id: &str,
        direction: MoveDirection,
        expected_version: Option<i64>,
    ) -> EngineResult<OrderSnapshot> {
        let snapshot = Self::current_order(db, scope, parent_id).await?;
        if let Some(expected) = expected_version {
            if expected != snapshot.version {
                warn!(scope = %scope, parent_id, expected, actual = snapshot.version, "Move rejected: stale version");
                return Err(EngineError::Conflict {
                    message: "The list was reordered by someone else".into(),
                    current: snapshot,
                });
            }
        }

        match swap_move(&snapshot.ids(), item_id, direction) {
            Ok(Some(desired)) => {
                Self::apply(db, scope, parent_id, &desired, Some(snapshot.version)).await
            }
            Ok(None) => Ok(snapshot),
            Err(err) => Err(EngineError::not_found(err.to_string())),
        }
    }

    /// Rewrites positions to 1..n in their current relative order and bumps
    /// the parent version. Used after a child was deleted.
    ///
    /// Runs on the caller's connection so it can share a transaction.
    pub async fn renormalize<C: ConnectionTrait>(
        db: &C,
        scope: ReorderScope,
        parent_id: &str,
    ) -> EngineResult<OrderSnapshot> {
        let snapshot = Self::current_order(db, scope, parent_id).await?;
        let plan: Vec<(String, i32)> = snapshot
            .items
            .iter()
            .map(|i| (i.id.clone(), i.order))
            .collect();
        Self::write_plan(db, scope, parent_id, &plan, snapshot.version).await?;
        Self::current_order(db, scope, parent_id).await
    }

    async fn write_order<C: ConnectionTrait>(
        db: &C,
        scope: ReorderScope,
        parent_id: &str,
        desired: &[String],
        expected_version: Option<i64>,
    ) -> EngineResult<OrderSnapshot> {
        let snapshot = Self::current_order(db, scope, parent_id).await?;

        if let Some(expected) = expected_version {
            if expected != snapshot.version {
                return Err(EngineError::Conflict {
                    message: "The list was reordered by someone else".into(),
                    current: snapshot,
                });
            }
        }

        let plan = match plan_reorder(&snapshot.ids(), desired) {
            Ok(plan) => plan,
            Err(err @ ReorderError::Stale { .. }) => {
                return Err(EngineError::Conflict {
                    message: err.to_string(),
                    current: snapshot,
                });
            }
            Err(err) => return Err(EngineError::Validation(err.to_string())),
        };

        Self::write_plan(db, scope, parent_id, &plan, snapshot.version).await?;
        Self::current_order(db, scope, parent_id).await
    }

    /// Claims the parent version first so concurrent writers fail fast, then
    /// writes every child position.
    async fn write_plan<C: ConnectionTrait>(
        db: &C,
        scope: ReorderScope,
        parent_id: &str,
        plan: &[(String, i32)],
        version: i64,
    ) -> EngineResult<()> {
        let lost_race = || EngineError::Conflict {
            message: "The list was reordered by someone else".into(),
            current: OrderSnapshot {
                scope,
                parent_id: parent_id.to_owned(),
                version,
                items: Vec::new(),
            },
        };
        let vanished = |id: &str| EngineError::Conflict {
            message: format!("Item '{id}' was removed while reordering"),
            current: OrderSnapshot {
                scope,
                parent_id: parent_id.to_owned(),
                version,
                items: Vec::new(),
            },
        };

        match scope {
            ReorderScope::Modules => {
                if !course::Model::bump_version(db, parent_id, version).await? {
                    return Err(lost_race());
                }
                for (id, order) in plan {
                    if !module::Model::set_position(db, parent_id, id, *order).await? {
                        return Err(vanished(id));
                    }
                }
            }
            ReorderScope::Lessons => {
                if !module::Model::bump_version(db, parent_id, version).await? {
                    return Err(lost_race());
                }
                for (id, order) in plan {
                    if !lesson::Model::set_position(db, parent_id, id, *order).await? {
                        return Err(vanished(id));
                    }
                }
            }
            ReorderScope::Questions => {
                let lesson = find_quiz_lesson(db, parent_id).await?;
                let mut quiz = lesson.quiz()?;
                quiz.apply_order(plan);
                quiz.validate()?;
                let content = quiz.to_content()?;
                if !lesson::Model::replace_content_versioned(db, parent_id, version, content).await? {
                    return Err(lost_race());
                }
            }
        }
        Ok(())
    }

    /// Re-reads the stored order after a failed write and attaches it to the
    /// error. Errors that carry no ordering context pass through unchanged.
    async fn reconcile(
        db: &DatabaseConnection,
        scope: ReorderScope,
        parent_id: &str,
        err: EngineError,
    ) -> EngineError {
        if matches!(
            err,
            EngineError::Validation(_) | EngineError::NotFound(_) | EngineError::Forbidden(_)
        ) {
            return err;
        }
        // Losing the write lock to another reorder is a conflict, not a failure.
        let wrap = match &err {
            EngineError::Conflict { .. } => false,
            EngineError::Database(db_err) => !is_lock_contention(db_err),
            _ => true,
        };

        let current = match Self::current_order(db, scope, parent_id).await {
            Ok(current) => current,
            Err(fetch_err) => {
                warn!(scope = %scope, parent_id, error = %fetch_err, "Could not re-read order after failed reorder");
                return err;
            }
        };

        if wrap {
            warn!(scope = %scope, parent_id, error = %err, version = current.version, "Reorder rolled back and reconciled");
            EngineError::Reconciled {
                source: Box::new(err),
                current,
            }
        } else {
            warn!(scope = %scope, parent_id, version = current.version, "Reorder conflict");
            let message = match err {
                EngineError::Database(_) => "The list is being reordered by someone else".to_string(),
                other => other.to_string(),
            };
            EngineError::Conflict { message, current }
        }
    }
}

async fn find_quiz_lesson<C: ConnectionTrait>(db: &C, lesson_id: &str) -> EngineResult<lesson::Model> {
    let lesson = lesson::Entity::find_by_id(lesson_id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Lesson not found"))?;
    if !lesson.is_quiz() {
        return Err(EngineError::validation("Lesson is not a quiz"));
    }
    Ok(lesson)
}

/// Bumps the parent version after a child was appended.
pub(crate) async fn touch_parent<C: ConnectionTrait>(
    db: &C,
    scope: ReorderScope,
    parent_id: &str,
) -> EngineResult<()> {
    match scope {
        ReorderScope::Modules => {
            course::Model::increment_version(db, parent_id).await?;
        }
        ReorderScope::Lessons => {
            module::Model::increment_version(db, parent_id).await?;
        }
        ReorderScope::Questions => {
            lesson::Model::increment_version(db, parent_id).await?;
        }
    }
    Ok(())
}
