/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use error_support::{handle_error, ErrorHandling, GetErrorHandling};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("not a number: {0}")]
    Parse(#[from] std::num::ParseIntError),
    #[error("negative: {0}")]
    Negative(i64),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum ExternalError {
    #[error("invalid input: {reason}")]
    Invalid { reason: String },
}

type ApiResult<T> = std::result::Result<T, ExternalError>;

impl GetErrorHandling for Error {
    type ExternalError = ExternalError;

    fn get_error_handling(&self) -> ErrorHandling<ExternalError> {
        ErrorHandling::convert(ExternalError::Invalid {
            reason: self.to_string(),
        })
        .log_warning()
    }
}

#[handle_error(Error)]
fn parse_positive(input: &str) -> ApiResult<i64> {
    let n: i64 = input.parse()?;
    if n < 0 {
        return Err(Error::Negative(n));
    }
    Ok(n)
}

struct Counter {
    base: i64,
}

impl Counter {
    #[handle_error(Error)]
    fn add(&self, input: &str) -> ApiResult<i64> {
        match input.parse::<i64>()? {
            n if n < 0 => Err(Error::Negative(n)),
            n => Ok(self.base + n),
        }
    }
}

#[test]
fn free_function() {
    assert_eq!(parse_positive("12"), Ok(12));
    assert_eq!(
        parse_positive("-3"),
        Err(ExternalError::Invalid {
            reason: "negative: -3".to_string()
        })
    );
    assert!(matches!(
        parse_positive("twelve"),
        Err(ExternalError::Invalid { .. })
    ));
}

#[test]
fn method() {
    let counter = Counter { base: 10 };
    assert_eq!(counter.add("5"), Ok(15));
    assert_eq!(
        counter.add("-1"),
        Err(ExternalError::Invalid {
            reason: "negative: -1".to_string()
        })
    );
}
