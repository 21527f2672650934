use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let client = connect(&connection_string).await?;
        client.batch_execute(include_str!("schema.sql")).await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        connect(&self.connection_string).await
    }

    /// Four players: three who have played (one holding a codechef handle)
    /// and one newcomer.
    pub async fn seed_test_data(&self) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .batch_execute(
                "INSERT INTO players (id, name, email, year, rating, volatility, times_played, best, last_five)
                 VALUES
                 ('P1', 'Ada', 'ada@example.com', 2019, 1710.0, 140.0, 6, 1750.0, 3),
                 ('P2', 'Brian', NULL, 2020, 1540.0, 220.0, 2, 1560.0, 1),
                 ('P3', 'Chloe', NULL, NULL, 1480.0, 260.0, 1, 1500.0, 5),
                 ('P4', 'Dev', NULL, 2021, 1500.0, 350.0, 0, 1500.0, 5);
                 INSERT INTO player_handles (player_id, site, handle) VALUES
                 ('P1', 'codechef', 'ada_cc'),
                 ('P1', 'topcoder', 'ada_tc');"
            )
            .await?;

        Ok(())
    }
}

async fn connect(connection_string: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Database connection error: {}", e);
        }
    });

    Ok(client)
}
