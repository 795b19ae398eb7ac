pub mod limits {

    pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

    pub const DEFAULT_ACTIVITY_DAYS: u32 = 30;
}

pub mod risk {

    /// Upper bound of the site/user risk scale.
    pub const MAX_RISK_LEVEL: i32 = 10;

    /// Lowest risk level counted as "high risk" in reports.
    pub const HIGH_RISK_FLOOR: i32 = 8;
}
