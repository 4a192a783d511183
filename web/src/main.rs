#[macro_use]
extern crate rocket;

use common::FillReport;
use rocket::{response::content::RawHtml, serde::json::Json};

// The textarea mirrors its value into `window.result` and counts `input`
// events so tests can read back what the browser actually dispatched.
const TEXTAREA_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Textarea fixture</title></head>
<body>
<style>
  textarea {
    display: block;
  }
</style>
<textarea spellcheck="false" autocomplete="off"></textarea>
<script>
  window.result = '';
  window.inputEvents = 0;
  const textarea = document.querySelector('textarea');
  textarea.addEventListener('input', () => {
    result = textarea.value;
    inputEvents += 1;
  }, false);
</script>
</body>
</html>
"#;

const BUTTON_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Button fixture</title></head>
<body>
<button onclick="clicked();">Click target</button>
<script>
  window.result = 'Was not clicked';
  function clicked() {
    result = 'Clicked';
  }
</script>
</body>
</html>
"#;

#[get("/")]
fn index() -> RawHtml<&'static str> {
    RawHtml(
        r#"<ul>
<li><a href="/input/textarea">textarea</a></li>
<li><a href="/input/button">button</a></li>
</ul>
"#,
    )
}

#[get("/input/textarea")]
fn textarea() -> RawHtml<&'static str> {
    RawHtml(TEXTAREA_PAGE)
}

#[get("/input/button")]
fn button() -> RawHtml<&'static str> {
    RawHtml(BUTTON_PAGE)
}

#[post("/input/report", data = "<payload>")]
fn report(payload: Json<FillReport>) -> &'static str {
    let payload = payload.into_inner();
    assert!(
        !payload.value.is_empty(),
        "[POST /input/report] empty value, fill the textarea first"
    );
    assert!(
        payload.input_events >= 1,
        "[POST /input/report] fill dispatched no input event"
    );
    "ok"
}

#[launch]
fn rocket() -> _ {
    rocket::build().mount("/", routes![index, textarea, button, report])
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::blocking::Client};

    fn client() -> Client {
        Client::tracked(super::rocket()).expect("valid rocket instance")
    }

    #[test]
    fn textarea_fixture_serves_one_textarea() {
        let client = client();
        let response = client.get("/input/textarea").dispatch();
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().unwrap();
        assert_eq!(body.matches("<textarea").count(), 1);
        assert!(body.contains("window.result"));
    }

    #[test]
    fn button_fixture_serves_click_target() {
        let client = client();
        let response = client.get("/input/button").dispatch();
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().unwrap();
        assert!(body.contains("<button"));
        assert!(body.contains("Was not clicked"));
    }

    #[test]
    fn report_accepts_observed_fill() {
        let client = client();
        let response = client
            .post("/input/report")
            .header(rocket::http::ContentType::JSON)
            .body(r#"{"value":"test","input_events":1}"#)
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
    }

    #[test]
    fn report_rejects_empty_fill() {
        let client = client();
        let response = client
            .post("/input/report")
            .header(rocket::http::ContentType::JSON)
            .body(r#"{"value":"","input_events":0}"#)
            .dispatch();
        assert_eq!(response.status(), Status::InternalServerError);
    }
}
