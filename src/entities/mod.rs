pub mod city;
pub mod country;
