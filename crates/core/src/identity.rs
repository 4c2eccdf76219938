//! Client identity rotation.
//!
//! Each call yields a freshly assembled browser user-agent. There is no
//! shared pool to mutate, so concurrent searches never see each other's
//! identity.

use rand::Rng;
use rand::seq::SliceRandom;

const DESKTOP_PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

const SAFARI_VERSIONS: &[&str] = &["16.6", "17.0", "17.4.1", "17.6", "18.1"];

#[derive(Debug, Clone, Copy)]
enum Browser {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

const BROWSERS: &[Browser] = &[Browser::Chrome, Browser::Chrome, Browser::Firefox, Browser::Edge, Browser::Safari];

/// Supplies a new pseudo-random user-agent string on demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRotator;

impl IdentityRotator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_identity(&self) -> String {
        let mut rng = rand::thread_rng();
        let browser = BROWSERS.choose(&mut rng).copied().unwrap_or(Browser::Chrome);

        match browser {
            Browser::Chrome | Browser::Edge => {
                let platform = DESKTOP_PLATFORMS.choose(&mut rng).copied().unwrap_or(DESKTOP_PLATFORMS[0]);
                let major: u32 = rng.gen_range(118..=131);
                let build: u32 = rng.gen_range(5000..=6800);
                let patch: u32 = rng.gen_range(0..=250);
                let chrome = format!(
                    "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.{build}.{patch} Safari/537.36"
                );
                if matches!(browser, Browser::Edge) { format!("{chrome} Edg/{major}.0.{build}.{patch}") } else { chrome }
            }
            Browser::Firefox => {
                let platform = DESKTOP_PLATFORMS.choose(&mut rng).copied().unwrap_or(DESKTOP_PLATFORMS[0]);
                let major: u32 = rng.gen_range(115..=133);
                format!("Mozilla/5.0 ({platform}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0")
            }
            Browser::Safari => {
                let version = SAFARI_VERSIONS.choose(&mut rng).copied().unwrap_or(SAFARI_VERSIONS[0]);
                format!(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} Safari/605.1.15"
                )
            }
        }
    }
}
