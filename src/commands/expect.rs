//! [`Expect`] command: waits until text appears in the program output.
//!
//! Script syntax:
//! - `expect "Name: "`: soft, 1-second default timeout
//! - `expect "Hello, AAA" 1`: critical (nonzero points)
//! - `expect "Ready" 0 500`: soft, 500 ms timeout
//! - `expect "Ready" 2s` or `expect "Ready" 1 750ms`: explicit timeout units

use crate::command::ScriptCommand;
use crate::expect::ExpectRequest;
use crate::parser::{parse_duration, split_arguments};
use crate::scenario::ScenarioController;
use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;

/// Waits for `request.expected` in the output of the running program.
///
/// A timeout never fails the script: with zero points it is reported and the
/// script goes on, otherwise the program is also stopped.
pub struct Expect {
    pub request: ExpectRequest,
}

impl Expect {
    pub const NAME: &'static str = "expect";

    pub fn new(request: ExpectRequest) -> Self {
        Self { request }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for Expect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let mut tokens = split_arguments(args)?.into_iter();
        let expected = tokens
            .next()
            .ok_or_else(|| anyhow!("Expected text after 'expect'"))?;
        let mut request = ExpectRequest::new(expected);

        // Bare integers fill points, then the timeout in milliseconds.
        let mut points = None;
        let mut timeout = None;
        for token in tokens {
            if let Ok(value) = token.parse::<i64>() {
                if points.is_none() {
                    points = Some(value);
                } else if timeout.is_none() {
                    let millis = u64::try_from(value)
                        .map_err(|_| anyhow!("Timeout must not be negative: {}", value))?;
                    timeout = Some(Duration::from_millis(millis));
                } else {
                    return Err(anyhow!("Unexpected argument: {}", token));
                }
            } else if timeout.is_none() {
                timeout = Some(
                    parse_duration(&token)
                        .with_context(|| format!("Invalid expect argument: {}", token))?,
                );
            } else {
                return Err(anyhow!("Unexpected argument: {}", token));
            }
        }

        if let Some(points) = points {
            request = request.with_points(points);
        }
        if let Some(timeout) = timeout {
            request = request.with_timeout(timeout);
        }
        Ok(Self::new(request))
    }

    async fn execute(&self, ctl: &mut ScenarioController) -> Result<()> {
        ctl.expect(&self.request).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cmd = Expect::parse(r#""Name: ""#).unwrap();
        assert_eq!(cmd.request.expected, "Name: ");
        assert_eq!(cmd.request.points, 0);
        assert_eq!(cmd.request.timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_points() {
        let cmd = Expect::parse(r#""Hello, AAA" 1"#).unwrap();
        assert_eq!(cmd.request.points, 1);
        assert_eq!(cmd.request.timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_points_and_millis() {
        let cmd = Expect::parse(r#""Ready" 0 500"#).unwrap();
        assert_eq!(cmd.request.points, 0);
        assert_eq!(cmd.request.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_duration_units() {
        let cmd = Expect::parse(r#""Ready" 2s"#).unwrap();
        assert_eq!(cmd.request.points, 0);
        assert_eq!(cmd.request.timeout, Duration::from_secs(2));

        let cmd = Expect::parse(r#""Ready" 3 750ms"#).unwrap();
        assert_eq!(cmd.request.points, 3);
        assert_eq!(cmd.request.timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expect::parse("").is_err());
        assert!(Expect::parse(r#""unclosed"#).is_err());
        assert!(Expect::parse(r#""x" soon"#).is_err());
        assert!(Expect::parse(r#""x" 1 2 3"#).is_err());
        assert!(Expect::parse(r#""x" 1 -5"#).is_err());
        assert!(Expect::parse(r#""x" 1s 2s"#).is_err());
    }
}
