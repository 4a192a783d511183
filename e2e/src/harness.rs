use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::FutureExt;
use playwright::{
    api::{Browser, Page},
    Playwright,
};
use std::{
    any::{type_name, Any},
    collections::HashMap,
    error::Error,
    fmt::{Debug, Display, Formatter},
    future::Future,
    panic::AssertUnwindSafe,
    process::{Child, Command, Stdio},
    time::Duration,
};
use tokio::{net::TcpStream, runtime::Runtime, time::sleep};

const SERVER_ADDR: &str = "127.0.0.1:8000";

// `cargo run -p web` may have to compile the server first.
const READY_ATTEMPTS: u32 = 600;
const READY_INTERVAL: Duration = Duration::from_millis(500);

/// Custom test framework entry point. Spawns the fixture web server, runs
/// every `#[test_case]` once per browser with a freshly provisioned page,
/// then tears the server down and exits with the suite's status.
pub fn e2e_test_runner(tests: &[&dyn Testable]) {
    let mut web_server = spawn_web_server();

    let runtime = Runtime::new().unwrap();
    let outcome = runtime.block_on(run_tests(tests));

    web_server.kill().unwrap();
    let _ = web_server.wait();

    std::process::exit(match outcome {
        Ok(test_results) => summarize(&test_results),
        Err(error) => {
            println!("{:#?}", error);
            1
        }
    });
}

fn spawn_web_server() -> Child {
    Command::new("cargo")
        .args(["run", "-p", "web"])
        .current_dir("..")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn summarize(test_results: &[TestResult]) -> i32 {
    println!("\nSummary:");
    for test_result in test_results {
        println!("{}", test_result);
    }

    let failures = test_results
        .iter()
        .filter(|test_result| test_result.result.is_err())
        .count();
    if failures == 0 {
        println!("{} tests ran with success", test_results.len());
        0
    } else {
        println!("{} errors", failures);
        1
    }
}

async fn run_tests(tests: &[&dyn Testable]) -> Result<Vec<TestResult>> {
    let playwright = Playwright::initialize().await?;
    playwright.prepare()?; // Install browsers

    wait_for_server(SERVER_ADDR).await?;
    let browsers = launch_browsers(&playwright).await?;

    let mut test_results = Vec::new();
    let mut errors: Option<ErrorList<FailedToOpenPage>> = None;

    for test in tests {
        for (&browser_type, browser) in &browsers {
            let page = match open_page(browser).await {
                Ok(page) => page,
                Err(err) => {
                    record(
                        &mut errors,
                        FailedToOpenPage {
                            browser_type,
                            test_name: test.name(),
                        },
                        err,
                    );
                    continue;
                }
            };

            let test_result = TestResult {
                test_name: test.name(),
                browser_type,
                result: test.run(Context { page }).await,
            };
            println!("{}", test_result);
            test_results.push(test_result);
        }
    }

    if let Some(errors) = errors {
        return Err(errors.into());
    }

    Ok(test_results)
}

async fn wait_for_server(addr: &str) -> Result<()> {
    for _ in 0..READY_ATTEMPTS {
        if TcpStream::connect(addr).await.is_ok() {
            return Ok(());
        }
        sleep(READY_INTERVAL).await;
    }
    bail!("web server at {} never accepted a connection", addr);
}

async fn launch_browsers(playwright: &Playwright) -> Result<HashMap<BrowserType, Browser>> {
    let mut browsers = HashMap::new();
    let mut errors: Option<ErrorList<FailedToLaunch>> = None;

    for &browser_type in BrowserType::ALL {
        let launched = match browser_type {
            BrowserType::Chromium => {
                playwright
                    .chromium()
                    .launcher()
                    .headless(true)
                    .launch()
                    .await
            }
            BrowserType::Firefox => {
                playwright
                    .firefox()
                    .launcher()
                    .headless(true)
                    .launch()
                    .await
            }
            BrowserType::Webkit => {
                playwright.webkit().launcher().headless(true).launch().await
            }
        };
        match launched {
            Ok(browser) => {
                browsers.insert(browser_type, browser);
            }
            Err(err) => record(&mut errors, FailedToLaunch(browser_type), err),
        }
    }

    if let Some(errors) = errors {
        return Err(errors.into());
    }

    Ok(browsers)
}

// Every test gets its own context so no cookies or storage leak between tests.
async fn open_page(browser: &Browser) -> Result<Page> {
    let context = browser.context_builder().build().await?;
    Ok(context.new_page().await?)
}

struct TestResult {
    test_name: &'static str,
    browser_type: BrowserType,
    result: Result<()>,
}

impl Display for TestResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "{} in {}...\t[OK]", self.test_name, self.browser_type),
            Err(err) => write!(
                f,
                "{} in {}...\t[FAILED]\n{:#?}",
                self.test_name, self.browser_type, err
            ),
        }
    }
}

#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, Hash)]
pub enum BrowserType {
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserType {
    const ALL: &'static [BrowserType] = &[
        BrowserType::Chromium,
        BrowserType::Firefox,
        BrowserType::Webkit,
    ];
}

impl Display for BrowserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BrowserType::Chromium => "Chromium",
                BrowserType::Firefox => "Firefox",
                BrowserType::Webkit => "Webkit",
            }
        )
    }
}

/// Injected into every test: the page provisioned for this test run.
pub struct Context {
    pub page: Page,
}

#[async_trait]
pub trait Testable {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: Context) -> Result<()>;
}

// Lets plain `async fn(Context) -> Result<()>` items be collected as test
// cases. Panics are caught so one panicking test cannot take the runner down.
#[async_trait]
impl<F, FF> Testable for F
where
    F: Fn(Context) -> FF + Sync,
    FF: Send,
    AssertUnwindSafe<FF>: Future<Output = Result<()>>,
{
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    async fn run(&self, ctx: Context) -> Result<()> {
        match AssertUnwindSafe(self(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(err) => Err(CaughtPanic::new(err).into()),
        }
    }
}

fn record<C, E: Into<anyhow::Error>>(errors: &mut Option<ErrorList<C>>, context: C, error: E) {
    match errors {
        Some(list) => list.push(context, error),
        None => *errors = Some(ErrorList::new(context, error)),
    }
}

struct ErrorList<C> {
    vec: Vec<(C, anyhow::Error)>,
}

impl<C> ErrorList<C> {
    fn new<E: Into<anyhow::Error>>(context: C, error: E) -> Self {
        ErrorList {
            vec: vec![(context, error.into())],
        }
    }

    fn push<E: Into<anyhow::Error>>(&mut self, context: C, error: E) {
        self.vec.push((context, error.into()));
    }
}

impl<C: Display> Debug for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {:#?}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Display for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Error for ErrorList<C> {}

struct FailedToLaunch(BrowserType);

impl Display for FailedToLaunch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to launch {}", self.0)
    }
}

struct FailedToOpenPage {
    test_name: &'static str,
    browser_type: BrowserType,
}

impl Display for FailedToOpenPage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to open page in {} of {}",
            self.browser_type, self.test_name
        )
    }
}

struct CaughtPanic(Option<Box<str>>);

impl CaughtPanic {
    fn new(err: Box<dyn Any + Send + 'static>) -> Self {
        match err.downcast::<String>() {
            Ok(message) => CaughtPanic(Some(message.into_boxed_str())),
            Err(err) => match err.downcast::<&str>() {
                Ok(message) => CaughtPanic(Some(message.to_string().into_boxed_str())),
                Err(_) => CaughtPanic(None),
            },
        }
    }
}

impl Debug for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "Unknown panic payload"),
        }
    }
}

impl Error for CaughtPanic {}
