use serde::Serialize;

use crate::CustomerId;

/// A customer going through the queue.
///
/// The arrival time is fixed at creation. Service start and departure times are recorded by the
/// simulation once a server picks up the customer and once the service finishes, respectively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Customer {
    id: CustomerId,
    arrival_time: f64,
    service_start_time: Option<f64>,
    departure_time: Option<f64>,
}

impl Customer {
    /// Constructs a customer arriving at `arrival_time`.
    #[must_use]
    pub fn new(id: CustomerId, arrival_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_start_time: None,
            departure_time: None,
        }
    }

    /// Customer ID, unique throughout the entire simulation.
    #[must_use]
    pub fn id(&self) -> CustomerId {
        self.id
    }

    /// The time of the simulation when the customer arrived.
    #[must_use]
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// The time of the simulation when a server picked up the customer.
    #[must_use]
    pub fn service_start_time(&self) -> Option<f64> {
        self.service_start_time
    }

    /// The time of the simulation when the service finished.
    #[must_use]
    pub fn departure_time(&self) -> Option<f64> {
        self.departure_time
    }

    /// Time spent in the waiting line; `None` until the service starts.
    #[must_use]
    pub fn waiting_time(&self) -> Option<f64> {
        self.service_start_time.map(|start| start - self.arrival_time)
    }

    /// Total time spent in the system; `None` until the customer departs.
    #[must_use]
    pub fn system_time(&self) -> Option<f64> {
        self.departure_time.map(|end| end - self.arrival_time)
    }

    pub(crate) fn start_service(&mut self, time: f64) {
        debug_assert!(self.service_start_time.is_none(), "service started twice");
        self.service_start_time = Some(time);
    }

    pub(crate) fn depart(&mut self, time: f64) {
        debug_assert!(self.departure_time.is_none(), "customer departed twice");
        self.departure_time = Some(time);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_customer_lifecycle() {
        let mut customer = Customer::new(CustomerId(4), 1.5);
        assert_eq!(customer.id(), CustomerId(4));
        assert_eq!(customer.waiting_time(), None);
        assert_eq!(customer.system_time(), None);

        customer.start_service(2.0);
        assert_eq!(customer.service_start_time(), Some(2.0));
        assert_eq!(customer.waiting_time(), Some(0.5));
        assert_eq!(customer.system_time(), None);

        customer.depart(4.5);
        assert_eq!(customer.departure_time(), Some(4.5));
        assert_eq!(customer.waiting_time(), Some(0.5));
        assert_eq!(customer.system_time(), Some(3.0));
        assert_eq!(customer.arrival_time(), 1.5);
    }
}
