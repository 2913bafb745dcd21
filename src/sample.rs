/// Built-in sample data: the fallback product catalog and the seeded order
/// history shown before any checkout.

use chrono::NaiveDate;

use crate::models::{Availability, Money, Order, OrderLine, OrderStatus, Product};

pub fn products() -> Vec<Product> {
    vec![
        Product::new(1u64, "Wireless Noise-Canceling Headphones", Money::from_cents(29_999))
            .with_original_price(Money::from_cents(39_999), 25)
            .with_rating(4.5, 1234)
            .with_store("TechStore")
            .with_category("Electronics")
            .with_description(
                "Premium wireless headphones with active noise cancellation and 30-hour battery life.",
            ),
        Product::new(2u64, "Sustainable Cotton T-Shirt", Money::from_cents(3_999))
            .with_rating(4.7, 567)
            .with_store("EcoFashion")
            .with_category("Fashion")
            .with_description("Made from 100% organic cotton, perfect for everyday wear."),
        Product::new(3u64, "Smart Home Security Camera", Money::from_cents(19_999))
            .with_original_price(Money::from_cents(24_999), 20)
            .with_rating(4.3, 890)
            .with_store("HomeTech")
            .with_category("Home Security")
            .with_description("1080p HD camera with night vision and motion detection."),
        Product::new(4u64, "Ergonomic Office Chair", Money::from_cents(44_999))
            .with_rating(4.6, 345)
            .with_store("OfficeSupply")
            .with_category("Furniture")
            .with_availability(Availability::Flag(false))
            .with_description("Adjustable office chair with lumbar support and breathable mesh."),
        Product::new(5u64, "Portable Bluetooth Speaker", Money::from_cents(7_999))
            .with_original_price(Money::from_cents(9_999), 20)
            .with_rating(4.4, 678)
            .with_store("AudioWorld")
            .with_category("Electronics")
            .with_description("Waterproof speaker with 12-hour battery and powerful bass."),
        Product::new(6u64, "Premium Yoga Mat", Money::from_cents(8_999))
            .with_rating(4.8, 234)
            .with_store("FitnessPro")
            .with_category("Fitness")
            .with_description("Non-slip yoga mat with alignment lines and carrying strap."),
        Product::new(7u64, "Stainless Steel Water Bottle", Money::from_cents(2_999))
            .with_original_price(Money::from_cents(3_999), 25)
            .with_rating(4.6, 456)
            .with_store("EcoLife")
            .with_category("Lifestyle")
            .with_description("Insulated water bottle that keeps drinks cold for 24 hours."),
        Product::new(8u64, "Gaming Mechanical Keyboard", Money::from_cents(15_999))
            .with_rating(4.7, 789)
            .with_store("GameHub")
            .with_category("Electronics")
            .with_description("RGB backlit mechanical keyboard with customizable keys."),
    ]
}

fn line(product_id: u64, name: &str, cents: i64, quantity: u32) -> OrderLine {
    OrderLine {
        product_id: product_id.into(),
        name: name.to_string(),
        price: Money::from_cents(cents),
        quantity,
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub fn orders() -> Vec<Order> {
    vec![
        Order {
            id: "ORD-2024-001".to_string(),
            date: date(2024, 1, 15),
            status: OrderStatus::Delivered,
            items: vec![
                line(1, "Wireless Noise-Canceling Headphones", 29_999, 1),
                line(5, "Portable Bluetooth Speaker", 7_999, 2),
            ],
            total: Money::from_cents(45_997),
            tracking_number: Some("TRK123456789".to_string()),
            estimated_delivery: Some(date(2024, 1, 18)),
        },
        Order {
            id: "ORD-2024-002".to_string(),
            date: date(2024, 1, 20),
            status: OrderStatus::Shipped,
            items: vec![
                line(2, "Sustainable Cotton T-Shirt", 3_999, 2),
                line(6, "Premium Yoga Mat", 8_999, 1),
            ],
            total: Money::from_cents(12_998),
            tracking_number: Some("TRK987654321".to_string()),
            estimated_delivery: Some(date(2024, 1, 25)),
        },
        Order {
            id: "ORD-2024-003".to_string(),
            date: date(2024, 1, 22),
            status: OrderStatus::Processing,
            items: vec![line(3, "Smart Home Security Camera", 19_999, 1)],
            total: Money::from_cents(19_999),
            tracking_number: None,
            estimated_delivery: None,
        },
    ]
}
