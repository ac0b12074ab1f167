/// One trip or event as read from a source file, before any parsing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Unparsed; see [`crate::timestamp::parse_timestamp`]
    pub timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_type: Option<i64>,
    pub fare_amount: Option<f64>,
    pub tip_amount: Option<f64>,
    pub trip_distance: Option<f64>,
    pub total_amount: Option<f64>,
}

impl RawRecord {
    #[must_use]
    pub fn at(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn located(lat: f64, lon: f64) -> Self {
        Self::default().with_location(lat, lon)
    }

    #[must_use]
    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    #[must_use]
    pub fn with_trip(mut self, distance: f64, fare: f64, tip: f64, total: f64) -> Self {
        self.trip_distance = Some(distance);
        self.fare_amount = Some(fare);
        self.tip_amount = Some(tip);
        self.total_amount = Some(total);
        self
    }

    #[must_use]
    pub fn with_payment_type(mut self, code: i64) -> Self {
        self.payment_type = Some(code);
        self
    }

    /// A trip that was actually driven and paid for
    #[must_use]
    pub fn is_paid_trip(&self) -> bool {
        matches!(self.total_amount, Some(total) if total > 0.0)
            && matches!(self.trip_distance, Some(distance) if distance > 0.0)
    }
}
