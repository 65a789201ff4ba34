//! Course listing, authoring, enrollment, and progress endpoints.
//!
//! Course *content* (curriculum, lessons) is out of scope; these endpoints
//! carry the envelope that enrollment and progress hang off.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use lectern_core::{
  course::{Course, Enrollment, NewCourse, validate_percent},
  money,
  store::PlatformStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
  guard::guard,
  routes::{INSTRUCTOR_PAGES, STUDENT_PAGES},
};

/// A course with its price re-expressed in display units for clients.
#[derive(Debug, Serialize)]
pub struct CourseView {
  #[serde(flatten)]
  pub course: Course,
  pub price:  f64,
}

impl From<Course> for CourseView {
  fn from(course: Course) -> Self {
    let price = money::from_minor_units(course.price_minor, &course.currency);
    CourseView { course, price }
  }
}

/// `GET /courses` — public catalogue.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<CourseView>>>
where
  S: PlatformStore,
{
  let courses = state.store.list_courses().await.map_err(Error::store)?;
  Ok(Json(courses.into_iter().map(CourseView::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseBody {
  pub title:       String,
  pub description: Option<String>,
  /// Display units, e.g. dollars. Stored in minor units.
  pub price:       f64,
  pub currency:    Option<String>,
}

/// `POST /courses`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<CreateCourseBody>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, INSTRUCTOR_PAGES).await?;

  if body.title.trim().is_empty() {
    return Err(Error::BadRequest("course title must not be empty".into()));
  }
  if !body.price.is_finite() || body.price < 0.0 {
    return Err(Error::BadRequest("price must be non-negative".into()));
  }
  let currency = body.currency.unwrap_or_else(|| "USD".to_string());

  let course = state
    .store
    .create_course(NewCourse {
      title:         body.title,
      description:   body.description,
      instructor_id: user.profile.user_id,
      price_minor:   money::to_minor_units(body.price, &currency),
      currency,
    })
    .await
    .map_err(Error::store)?;

  Ok((StatusCode::CREATED, Json(CourseView::from(course))))
}

/// `POST /courses/{id}/enroll` — idempotent for an already-enrolled user.
pub async fn enroll<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Path(course_id): Path<Uuid>,
) -> Result<Json<Enrollment>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, STUDENT_PAGES).await?;

  let enrollment = state
    .store
    .enroll(course_id, user.profile.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("course {course_id} not found")))?;
  Ok(Json(enrollment))
}

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
  pub percent: u8,
}

/// `POST /courses/{id}/progress`
pub async fn progress<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Path(course_id): Path<Uuid>,
  Json(body): Json<ProgressBody>,
) -> Result<Json<Enrollment>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, STUDENT_PAGES).await?;

  let percent = validate_percent(body.percent)
    .map_err(|e| Error::BadRequest(e.to_string()))?;

  let enrollment = state
    .store
    .record_progress(course_id, user.profile.user_id, percent)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      Error::NotFound(format!("no enrollment in course {course_id}"))
    })?;
  Ok(Json(enrollment))
}
