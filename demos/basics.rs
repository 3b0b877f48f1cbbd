use log::info;
use otpauth::{HashAlgorithm, Hotp, Otp, Secret, Totp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    let secret = Secret::random()?;
    info!("new secret: {}", secret.base32());

    let totp = Totp::new(secret.clone())
        .with_issuer("ACME Co")
        .with_label("alice@example.com")
        .with_algorithm(HashAlgorithm::Sha256)
        .with_digits(6)
        .with_period(30);

    let token = totp.generate()?;
    println!("TOTP     : {token}");
    println!("remaining: {}ms", totp.remaining()?);
    println!("valid    : {:?}", totp.validate(&token)?);

    let uri = totp.to_string();
    println!("URI      : {uri}");

    match uri.parse::<Otp>()? {
        Otp::Totp(parsed) if parsed == totp => println!("success  : URI round trip"),
        other => println!("fail     : parsed back as {other:?}"),
    }

    let mut hotp = Hotp::new(secret).with_label("alice@example.com").with_counter(41);
    let first = hotp.generate()?;
    let second = hotp.generate()?;
    println!("HOTP 41  : {first}");
    println!("HOTP 42  : {second}");
    println!("counter  : {}", hotp.counter());
    println!("offset   : {:?}", hotp.validate_at(&first, hotp.counter(), 2)?);

    Ok(())
}
