pub mod heating_bill;
