use rocket::State;
use rocket::serde::json::Json;
use serde_json::{Map, Value};
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{get_content, save_content};
use crate::live::{ChangeBus, ChangeKind, Collection};
use crate::models::{ContentSection, WebsiteContent};
use crate::validation::ApiResult;

/// Public read of one website section; defaults until first saved.
#[get("/content/<section>")]
pub async fn api_get_content(
    section: &str,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<WebsiteContent>> {
    let section = ContentSection::parse(section)?;
    Ok(Json(get_content(db, section).await?))
}

/// Merges the posted keys into the stored section.
#[put("/content/<section>", data = "<patch>")]
pub async fn api_save_content(
    section: &str,
    patch: Json<Map<String, Value>>,
    user: User,
    db: &State<Pool<Sqlite>>,
    bus: &State<ChangeBus>,
) -> ApiResult<Json<WebsiteContent>> {
    user.require_permission(Permission::ManageWebsiteContent)?;
    let section = ContentSection::parse(section)?;

    let saved = save_content(db, section, patch.into_inner()).await?;
    bus.publish(Collection::Content, ChangeKind::Updated, section.key());

    Ok(Json(saved))
}
