use rand::rngs::OsRng;
use rand::Rng;

pub const CODE_LENGTH: usize = 6;
pub const DEMO_CODE: &str = "123456";

/// Source of one-time unlock codes.
pub trait CodeIssuer: Send + Sync {
    /// Issue a fresh code. `previous` is the last code handed out by the
    /// session, which a sound issuer must not repeat.
    fn issue(&self, previous: Option<&str>) -> String;
}

/// Uniform 6-digit codes from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeIssuer;

impl CodeIssuer for RandomCodeIssuer {
    fn issue(&self, previous: Option<&str>) -> String {
        loop {
            let code = format!("{:06}", OsRng.gen_range(0..1_000_000u32));
            if previous != Some(code.as_str()) {
                return code;
            }
        }
    }
}

/// Hands out the same code every time. Reproduces the demo client and is
/// unsafe for anything else.
#[derive(Debug, Clone)]
pub struct FixedCodeIssuer {
    code: String,
}

impl FixedCodeIssuer {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        tracing::warn!("Fixed unlock code policy in use; codes are guessable");
        Self { code }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_CODE)
    }
}

impl CodeIssuer for FixedCodeIssuer {
    fn issue(&self, _previous: Option<&str>) -> String {
        self.code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_codes_are_six_digits() {
        let issuer = RandomCodeIssuer;
        for _ in 0..200 {
            let code = issuer.issue(None);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_random_never_repeats_previous() {
        let issuer = RandomCodeIssuer;
        let mut previous = issuer.issue(None);
        for _ in 0..200 {
            let next = issuer.issue(Some(&previous));
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_fixed_issuer() {
        let issuer = FixedCodeIssuer::demo();
        assert_eq!(issuer.issue(Some(DEMO_CODE)), DEMO_CODE);
    }
}
