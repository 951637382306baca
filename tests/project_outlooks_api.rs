mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Datelike;
use serde_json::{json, Value};

use common::*;

fn this_year() -> i32 {
    chrono::Utc::now().year()
}

fn outlook_body(state_id: i64, lga_id: i64, outlook: i64, year: i32) -> Value {
    json!({"state_id": state_id, "lga_id": lga_id, "outlook": outlook, "project_year": year})
}

#[tokio::test]
async fn create_validates_outlook_and_year() -> Result<()> {
    let t = spawn().await?;
    let token = t
        .login("lagos@example.gov.ng", Grants::of(&["state_editor"]).states(&[LAGOS]))
        .await?;

    let body = outlook_body(LAGOS, IKEJA, 120, this_year());
    let (status, created) = t.send("POST", "/project-outlooks", Some(&token), Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["outlook"], 120);

    let body = outlook_body(LAGOS, IKEJA, 0, this_year());
    let (status, err) = t.send("POST", "/project-outlooks", Some(&token), Some(body)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["field"], "outlook");

    let body = outlook_body(LAGOS, IKEJA, 5, this_year() - 1);
    let (status, err) = t.send("POST", "/project-outlooks", Some(&token), Some(body)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["field"], "project_year");
    Ok(())
}

#[tokio::test]
async fn create_needs_only_the_permission() -> Result<()> {
    let t = spawn().await?;
    let state_editor = t
        .login("planner@example.gov.ng", Grants::of(&["state_editor"]))
        .await?;
    let lga_editor = t
        .login("ikeja@example.gov.ng", Grants::of(&["lga_editor"]).lgas(&[IKEJA]))
        .await?;

    // no grants at all, and Kano is nobody's region here
    let kano = outlook_body(KANO, NASSARAWA, 10, this_year());
    let (status, body) = t
        .send("POST", "/project-outlooks", Some(&state_editor), Some(kano))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["state_id"], KANO);

    // lga_editor lacks create_project_outlooks
    let ikeja = outlook_body(LAGOS, IKEJA, 10, this_year());
    let (status, _) = t
        .send("POST", "/project-outlooks", Some(&lga_editor), Some(ikeja))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = t.admin().await?;
    let mismatched = outlook_body(KANO, IKEJA, 10, this_year());
    let (status, _) = t
        .send("POST", "/project-outlooks", Some(&admin), Some(mismatched))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_checks_outlook_and_year_within_coverage() -> Result<()> {
    let t = spawn().await?;
    let ikeja = t.insert_outlook(LAGOS, IKEJA, 50, this_year()).await?;
    let epe = t.insert_outlook(LAGOS, EPE, 50, this_year()).await?;
    let token = t
        .login("ikeja@example.gov.ng", Grants::of(&["lga_editor"]).lgas(&[IKEJA]))
        .await?;

    let body = |outlook: i64, year: i32| json!({"outlook": outlook, "project_year": year});
    let uri = format!("/project-outlooks/{ikeja}");

    let (status, updated) = t
        .send("PUT", &uri, Some(&token), Some(body(0, this_year() + 1)))
        .await?;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["outlook"], 0);
    assert_eq!(updated["project_year"], this_year() + 1);

    let stored =
        sqlx::query_scalar::<_, i32>("SELECT project_year FROM project_outlooks WHERE id = ?")
            .bind(ikeja)
            .fetch_one(&t.pool)
            .await?;
    assert_eq!(stored, this_year() + 1);

    let (status, err) = t
        .send("PUT", &uri, Some(&token), Some(body(-3, this_year())))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["field"], "outlook");

    let (status, err) = t
        .send("PUT", &uri, Some(&token), Some(body(3, this_year() - 1)))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["field"], "project_year");

    let other = format!("/project-outlooks/{epe}");
    let (status, _) = t
        .send("PUT", &other, Some(&token), Some(body(3, this_year())))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn delete_and_list() -> Result<()> {
    let t = spawn().await?;
    let id = t.insert_outlook(LAGOS, IKEJA, 50, this_year()).await?;
    t.insert_outlook(KANO, NASSARAWA, 70, this_year()).await?;
    let uri = format!("/project-outlooks/{id}");
    let token = t
        .login("lagos@example.gov.ng", Grants::of(&["state_editor"]).states(&[LAGOS]))
        .await?;

    let (status, body) = t.send("GET", "/project-outlooks", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    // state_editor lacks delete_project_outlooks
    let (status, _) = t.send("DELETE", &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = t.admin().await?;
    let (status, _) = t.send("DELETE", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.send("DELETE", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let outsider = t
        .login("users@example.gov.ng", Grants::of(&["user_admin"]))
        .await?;
    let (status, _) = t.send("GET", "/project-outlooks", Some(&outsider), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
