use serde::{Deserialize, Serialize};

// One page to audit, as read from the sites file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub route: String,
    pub screen: String,
    pub url: String,
}

// Which rendering context the audit simulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Device {
    Mobile,
    Desktop,
}

impl Device {
    // Mobile is always audited before desktop
    pub const ALL: [Device; 2] = [Device::Mobile, Device::Desktop];

    // Value of the `strategy` query parameter
    pub fn strategy(self) -> &'static str {
        match self {
            Device::Mobile => "mobile",
            Device::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Device::Mobile => "MOBILE",
            Device::Desktop => "DESKTOP",
        })
    }
}

// The four category scores from one successful audit, each on a 0-1 scale.
// None means the category went unscored, which is not the same as scoring 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

impl ScoreSet {
    // Column order used by the report, not the order of the request parameters
    pub fn in_column_order(&self) -> [Option<f64>; 4] {
        [self.performance, self.accessibility, self.best_practices, self.seo]
    }
}

// One row of the final report: both device audits merged onto their page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub route: String,
    pub screen: String,
    pub url: String,
    pub mobile: ScoreSet,
    pub desktop: ScoreSet,
}

impl ReportRecord {
    pub fn from_site(site: &Site) -> ReportRecord {
        ReportRecord {
            route: site.route.clone(),
            screen: site.screen.clone(),
            url: site.url.clone(),
            mobile: ScoreSet::default(),
            desktop: ScoreSet::default(),
        }
    }

    pub fn set_scores(&mut self, device: Device, scores: ScoreSet) {
        match device {
            Device::Mobile => self.mobile = scores,
            Device::Desktop => self.desktop = scores,
        }
    }
}

// An audit that never produced a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub url: String,
    pub device: Device,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub failures: Vec<Failure>,
    pub reports: Vec<ReportRecord>,
}

// Subset of the PageSpeed v5 response this tool consumes. Every path here is
// part of the API contract, so a missing field fails the decode.
#[derive(Debug, Deserialize)]
pub struct AuditResponse {
    #[serde(rename = "loadingExperience")]
    pub loading_experience: LoadingExperience,
    #[serde(rename = "lighthouseResult")]
    pub lighthouse_result: LighthouseResult,
}

#[derive(Debug, Deserialize)]
pub struct LoadingExperience {
    pub initial_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LighthouseResult {
    #[serde(rename = "finalUrl")]
    pub final_url: String,
    #[serde(rename = "configSettings")]
    pub config_settings: ConfigSettings,
    pub categories: Categories,
}

#[derive(Debug, Deserialize)]
pub struct ConfigSettings {
    #[serde(rename = "emulatedFormFactor")]
    pub emulated_form_factor: String,
}

#[derive(Debug, Deserialize)]
pub struct Categories {
    pub performance: Category,
    pub accessibility: Category,
    #[serde(rename = "best-practices")]
    pub best_practices: Category,
    pub seo: Category,
}

// score is null when Lighthouse could not score the category
#[derive(Debug, Deserialize)]
pub struct Category {
    pub score: Option<f64>,
}

impl AuditResponse {
    pub fn scores(&self) -> ScoreSet {
        let categories = &self.lighthouse_result.categories;
        ScoreSet {
            performance: categories.performance.score,
            accessibility: categories.accessibility.score,
            best_practices: categories.best_practices.score,
            seo: categories.seo.score,
        }
    }
}
