pub mod cashoutmodel;
pub mod jobmodel;
pub mod revenuemodel;
pub mod workermodel;
