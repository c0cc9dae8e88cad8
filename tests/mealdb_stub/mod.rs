use std::collections::HashSet;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

#[derive(Debug, Clone, Default)]
pub struct MealDbStubConfig {
    /// First letters answered with HTTP 500.
    pub failing_letters: HashSet<char>,
    /// First letters answered with a body that is not JSON.
    pub garbled_letters: HashSet<char>,
}

pub struct MealDbStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl MealDbStub {
    pub fn spawn(config: MealDbStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start mealdb stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let meals = fixture_meals();
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let raw_url = request.url().to_string();
                seen.lock().unwrap().push(raw_url.clone());

                let (status, body) = respond(&config, &meals, &raw_url);
                let mut response = tiny_http::Response::from_string(body).with_status_code(status);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Request paths (with query) received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_requests(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }
}

impl Drop for MealDbStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond(config: &MealDbStubConfig, meals: &[Value], raw_url: &str) -> (u16, String) {
    let Ok(url) = url::Url::parse(&format!("http://stub{raw_url}")) else {
        return (400, "bad url".to_owned());
    };
    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };
    let name_of = |meal: &Value| meal["strMeal"].as_str().unwrap_or_default().to_lowercase();

    let matched: Vec<Value> = match url.path() {
        "/v1/search.php" => {
            if let Some(letter) = query("f") {
                let letter = letter.chars().next().unwrap_or(' ');
                if config.failing_letters.contains(&letter) {
                    return (500, "upstream exploded".to_owned());
                }
                if config.garbled_letters.contains(&letter) {
                    return (200, "<html>not json</html>".to_owned());
                }
                meals
                    .iter()
                    .filter(|meal| name_of(meal).starts_with(letter))
                    .cloned()
                    .collect()
            } else if let Some(term) = query("s") {
                let term = term.to_lowercase();
                meals
                    .iter()
                    .filter(|meal| name_of(meal).contains(&term))
                    .cloned()
                    .collect()
            } else {
                return (400, "missing query".to_owned());
            }
        }
        "/v1/lookup.php" => {
            let id = query("i").unwrap_or_default();
            meals
                .iter()
                .filter(|meal| meal["idMeal"] == id.as_str())
                .cloned()
                .collect()
        }
        "/v1/filter.php" => {
            let category = query("c").unwrap_or_default();
            meals
                .iter()
                .filter(|meal| meal["strCategory"] == category.as_str())
                .map(|meal| {
                    json!({
                        "strMeal": meal["strMeal"],
                        "strMealThumb": meal["strMealThumb"],
                        "idMeal": meal["idMeal"],
                    })
                })
                .collect()
        }
        "/v1/categories.php" => {
            let body = json!({
                "categories": [
                    { "idCategory": "1", "strCategory": "Beef" },
                    { "idCategory": "2", "strCategory": "Chicken" },
                    { "idCategory": "3", "strCategory": "Dessert" },
                ]
            });
            return (200, body.to_string());
        }
        _ => return (404, "not found".to_owned()),
    };

    let body = if matched.is_empty() {
        json!({ "meals": null })
    } else {
        json!({ "meals": matched })
    };
    (200, body.to_string())
}

fn meal(id: &str, name: &str, category: &str, area: &str, ingredients: &[(&str, &str)]) -> Value {
    let mut value = json!({
        "idMeal": id,
        "strMeal": name,
        "strCategory": category,
        "strArea": area,
        "strInstructions": format!("Cook the {name}."),
        "strMealThumb": format!("https://img.example.com/{id}.jpg"),
        "strTags": null,
        "strYoutube": "",
        "strSource": null,
    });
    let obj = value.as_object_mut().expect("meal object");
    for n in 1..=20 {
        let (ingredient, measure) = ingredients
            .get(n - 1)
            .map(|(i, m)| (json!(i), json!(m)))
            .unwrap_or((json!(""), json!(null)));
        obj.insert(format!("strIngredient{n}"), ingredient);
        obj.insert(format!("strMeasure{n}"), measure);
    }
    value
}

fn fixture_meals() -> Vec<Value> {
    vec![
        meal(
            "52771",
            "Spicy Arrabiata Penne",
            "Vegetarian",
            "Italian",
            &[("penne rigate", "1 pound"), ("olive oil", "1/4 cup"), ("Salt", "1 tsp")],
        ),
        meal(
            "52772",
            "Teriyaki Chicken Casserole",
            "Chicken",
            "Japanese",
            &[("soy sauce", "3/4 cup"), ("salt", "2 tsp"), ("chicken breasts", "2")],
        ),
        meal(
            "52773",
            "Honey Teriyaki Salmon",
            "Seafood",
            "Japanese",
            &[("Salmon", "1 lb"), ("Soy Sauce", "1 tbs")],
        ),
        meal("52774", "Apple Frangipan Tart", "Dessert", "British", &[("Apple", "2")]),
        meal("52775", "Beef Wellington", "Beef", "British", &[("Beef Fillet", "600g")]),
        meal("52776", "Bread omelette", "Breakfast", "Indian", &[("Bread", "2")]),
        meal("52777", "Chicken Handi", "Chicken", "Indian", &[("Chicken", "1.2 kg")]),
    ]
}
