//! Toll table used by the command-line shell. The recognition pipeline does not depend on it.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Bicycle,
    Motorcycle,
    Car,
    Van,
    Bus,
    Truck,
    Suv,
    Taxi,
    /// Exempt from tolls
    Ambulance,
}

impl VehicleCategory {
    pub fn is_exempt(self) -> bool {
        matches!(self, VehicleCategory::Ambulance)
    }
}

/// Base toll amounts. SUV and taxi tolls are derived from the car toll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TollSchedule {
    pub bicycle: f64,
    pub motorcycle: f64,
    pub car: f64,
    pub van: f64,
    pub bus: f64,
    pub truck: f64,
    pub suv_multiplier: f64,
}

impl Default for TollSchedule {
    fn default() -> Self {
        Self {
            bicycle: 10.0,
            motorcycle: 25.0,
            car: 50.0,
            van: 70.0,
            bus: 80.0,
            truck: 110.0,
            suv_multiplier: 1.5,
        }
    }
}

impl TollSchedule {
    pub fn toll_for(&self, category: VehicleCategory) -> f64 {
        match category {
            VehicleCategory::Bicycle => self.bicycle,
            VehicleCategory::Motorcycle => self.motorcycle,
            VehicleCategory::Car => self.car,
            VehicleCategory::Van => self.van,
            VehicleCategory::Bus => self.bus,
            VehicleCategory::Truck => self.truck,
            VehicleCategory::Suv => self.car * self.suv_multiplier,
            VehicleCategory::Taxi => self.car,
            VehicleCategory::Ambulance => 0.0,
        }
    }
}

/// Running total of collected tolls
#[derive(Debug, Clone, Default)]
pub struct TollLedger {
    schedule: TollSchedule,
    collected: f64,
    vehicles: usize,
}

impl TollLedger {
    pub fn new(schedule: TollSchedule) -> Self {
        Self {
            schedule,
            collected: 0.0,
            vehicles: 0,
        }
    }

    /// Charge one vehicle and return the amount due
    pub fn charge(&mut self, category: VehicleCategory) -> f64 {
        let amount = self.schedule.toll_for(category);
        self.collected += amount;
        self.vehicles += 1;
        amount
    }

    pub fn collected(&self) -> f64 {
        self.collected
    }

    pub fn vehicles(&self) -> usize {
        self.vehicles
    }
}
