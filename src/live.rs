use rocket::State;
use rocket::Shutdown;
use rocket::request::FromParam;
use rocket::response::stream::{Event, EventStream};
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::{self, error::RecvError};
use serde::Serialize;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info, instrument, warn};

use crate::auth::{Permission, User};
use crate::db;
use crate::error::AppError;
use crate::models::ContentSection;
use crate::validation::{ApiResult, ValidationResponse};

const BUS_CAPACITY: usize = 256;

/// Collections a client can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Students,
    Teachers,
    Classes,
    Subjects,
    Results,
    Fees,
    Attendance,
    Notices,
    Content,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Classes => "classes",
            Collection::Subjects => "subjects",
            Collection::Results => "results",
            Collection::Fees => "fees",
            Collection::Attendance => "attendance",
            Collection::Notices => "notices",
            Collection::Content => "content",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "students" => Ok(Collection::Students),
            "teachers" => Ok(Collection::Teachers),
            "classes" => Ok(Collection::Classes),
            "subjects" => Ok(Collection::Subjects),
            "results" => Ok(Collection::Results),
            "fees" => Ok(Collection::Fees),
            "attendance" => Ok(Collection::Attendance),
            "notices" => Ok(Collection::Notices),
            "content" => Ok(Collection::Content),
            _ => Err(AppError::NotFound(format!("Unknown collection: {}", s))),
        }
    }
}

impl<'a> FromParam<'a> for Collection {
    type Error = AppError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Collection::parse(param)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub id: String,
}

/// Fan-out of write notifications to live-query subscribers. Writers never
/// wait on subscribers; a subscriber that falls behind sees `Lagged`.
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, collection: Collection, kind: ChangeKind, id: impl Into<String>) {
        let event = ChangeEvent {
            collection,
            kind,
            id: id.into(),
        };

        match self.sender.send(event) {
            Ok(receivers) => debug!(
                collection = collection.as_str(),
                kind = ?kind,
                receivers,
                "Published change event"
            ),
            Err(_) => debug!(
                collection = collection.as_str(),
                "No live subscribers for change event"
            ),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

/// Full current contents of `collection`, as the list endpoints return it.
#[instrument(skip(pool))]
pub async fn snapshot(pool: &Pool<Sqlite>, collection: Collection) -> Result<Value, AppError> {
    let value = match collection {
        Collection::Students => serde_json::to_value(db::list_students(pool).await?)?,
        Collection::Teachers => serde_json::to_value(db::list_teachers(pool).await?)?,
        Collection::Classes => serde_json::to_value(db::list_classes(pool).await?)?,
        Collection::Subjects => serde_json::to_value(db::list_subjects(pool).await?)?,
        Collection::Results => serde_json::to_value(db::list_results(pool).await?)?,
        Collection::Fees => serde_json::to_value(db::list_fees(pool).await?)?,
        Collection::Attendance => serde_json::to_value(db::list_attendance(pool).await?)?,
        Collection::Notices => serde_json::to_value(db::list_notices(pool).await?)?,
        Collection::Content => {
            let mut sections = Vec::with_capacity(ContentSection::ALL.len());
            for section in ContentSection::ALL {
                sections.push(db::get_content(pool, section).await?);
            }
            serde_json::to_value(sections)?
        }
    };

    Ok(value)
}

async fn snapshot_event(pool: &Pool<Sqlite>, collection: Collection) -> Event {
    match snapshot(pool, collection).await {
        Ok(value) => Event::json(&value).event("snapshot"),
        Err(err) => {
            err.log_and_record("Live query snapshot");
            Event::json(&ValidationResponse::from(&err)).event("error")
        }
    }
}

/// Snapshot on subscribe, then a fresh snapshot after every write to the
/// collection. Ends when the client goes away or the server shuts down.
#[get("/live/<collection>")]
pub async fn api_live(
    collection: Result<Collection, AppError>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
    mut shutdown: Shutdown,
) -> ApiResult<EventStream![]> {
    user.require_permission(Permission::SubscribeLiveQueries)?;
    let collection = collection?;

    let pool = db.inner().clone();
    let mut rx = bus.subscribe();
    info!(collection = collection.as_str(), email = %user.email, "Live query subscribed");

    Ok(EventStream! {
        yield snapshot_event(&pool, collection).await;

        loop {
            let refresh = select! {
                change = rx.recv() => match change {
                    Ok(change) => change.collection == collection,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(collection = collection.as_str(), skipped, "Live query lagged, sending fresh snapshot");
                        true
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut shutdown => break,
            };

            if refresh {
                yield snapshot_event(&pool, collection).await;
            }
        }

        info!(collection = collection.as_str(), "Live query closed");
    })
}
